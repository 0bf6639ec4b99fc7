//! additive - plays a short demo phrase on the default output device
//!
//! Run with: cargo run -- [preset-directory]

mod app;

use std::path::PathBuf;

use app::Player;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let preset_dir = std::env::args_os().nth(1).map(PathBuf::from);

    Player::new()
        .note_length_ms(300)
        .presets(preset_dir)
        .run()
}
