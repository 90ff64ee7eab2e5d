use flashlight::game::{Settings, run};

fn main() -> anyhow::Result<()> {
    run(Settings::default())
}
