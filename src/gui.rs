pub mod application;
pub mod controls;
pub mod display_panel;
pub mod overlay_list_panel;
pub mod settings_window;
pub mod utils;
pub mod widget_list;
