// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod deduplication;
pub mod sink;
pub mod store;

pub use deduplication::FindingDeduplicator;
pub use sink::{LogEntry, ReportSink, StatsUpdate, TIME_FORMAT};
pub use store::{LogColumn, ReportEvent, ReportStore};
