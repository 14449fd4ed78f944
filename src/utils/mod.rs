pub mod time_format;

pub use time_format::{
    default_until, format_elapsed, format_git_boundary, format_git_until, parse_commit_date,
    parse_date_arg, COMMIT_DATE_FORMAT,
};
