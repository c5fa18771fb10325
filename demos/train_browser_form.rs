use std::{env, error::Error, path::PathBuf};

use form_rl::{
    algo::QTableAgent,
    config::TrainingConfig,
    trainer::Trainer,
    web::{chrome::ChromePage, FormEnv},
};

/// Usage: train_browser_form [URL] [CONFIG]
///
/// Without a URL the bundled `demos/test_form.html` is used.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let url = match args.next() {
        Some(url) => url,
        None => {
            let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/test_form.html");
            format!("file://{}", path.display())
        }
    };
    let config = match args.next() {
        Some(path) => TrainingConfig::from_path(path)?,
        None => TrainingConfig::default(),
    };
    let headless = env::var_os("FORM_RL_HEADLESS").is_some();

    let page = ChromePage::launch(url, headless)?;
    let env = config.form_env(page);
    let agent = QTableAgent::<FormEnv<ChromePage>>::new(config.agent_config()?)?;
    let mut trainer = Trainer::new(env, agent, &config);

    let session = trainer.run()?;
    println!("{}", session.summary());
    println!(
        "{} Q values saved to {}",
        trainer.agent().len(),
        config.snapshot_path.display()
    );
    Ok(())
}
