// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{
    Mode, build_options, format_host_listing, handle_feed, handle_single, resolve_output_dir,
    select_mode,
};
