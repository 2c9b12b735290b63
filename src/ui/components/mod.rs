pub mod chapter_list;
pub mod dashboard;
pub mod leaderboard_table;
pub mod progress_bar;
pub mod stats_panel;
pub mod stats_sidebar;
pub mod typing_area;
