use anyhow::Result;
use std::process::ExitCode;

mod clip;
mod cmds;
mod error;
mod ffmpeg;

fn main() -> Result<ExitCode> {
    let status = cmds::handle_commands()?;
    Ok(ExitCode::from(status))
}
