fn main() -> anyhow::Result<()> {
    weatherstation_lib::run()
}
