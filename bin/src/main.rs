use anyhow::Result;

mod cli;
mod cmdrun;
mod filelist;

fn main() -> Result<()> {
    cli::run()
}
