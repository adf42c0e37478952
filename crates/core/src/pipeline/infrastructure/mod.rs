pub mod annotating_sink;
pub mod json_report_sink;
pub mod prefetching_reader;
