use anyhow::Result;
use tesser_cli::app;

fn main() -> Result<()> {
    app::run()
}
