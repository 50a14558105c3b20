use getting_started::config::WindowConfig;
use getting_started::lessons::shaders_uniform::ShadersUniform;
use gl_thin::gl_helper::GlApi;

fn main() -> anyhow::Result<()> {
    getting_started::init_logging();
    getting_started::run_lesson::<ShadersUniform<GlApi>>(WindowConfig::DEFAULT)?;
    Ok(())
}
