fn main() -> anyhow::Result<()> {
    nanotemplate_cli::run()
}
