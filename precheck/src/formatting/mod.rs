//! CLI output formatting.
//!
//! Human-readable output only; `--json` output bypasses this module.

mod headers;
mod output;
mod progress;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::{format_duration, print_key_value, print_summary_box};
pub use progress::create_progress_bar;
pub use status::{print_error, print_success, print_warning, Status};
pub use tables::{print_affected_table, print_package_table, print_result_table};
