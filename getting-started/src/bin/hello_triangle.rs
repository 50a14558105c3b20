use getting_started::config::WindowConfig;
use getting_started::lessons::hello_triangle::HelloTriangle;
use gl_thin::gl_helper::GlApi;

fn main() -> anyhow::Result<()> {
    getting_started::init_logging();
    getting_started::run_lesson::<HelloTriangle<GlApi>>(WindowConfig::DEFAULT)?;
    Ok(())
}
