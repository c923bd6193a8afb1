pub mod export;
pub mod formatter;
pub mod theme;

pub use export::write_export;
pub use formatter::{
    format_breakdown, format_grid, format_points, format_skipped, format_standings_list,
    format_summary, format_tsv, get_terminal_width, grid_width, should_use_colors, GridOptions,
};
pub use theme::{CellStyle, Theme, ThemeColors};
