use std::{env, error::Error};

use form_rl::{
    algo::QTableAgent, config::TrainingConfig, env::Environment, gym::SimulatedForm,
    trainer::Trainer, web::FormEnv,
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => TrainingConfig::from_path(path)?,
        None => TrainingConfig {
            episodes: 60,
            snapshot_path: "target/simulated_form_model.json".into(),
            log_path: Some("target/simulated_form_training.csv".into()),
            ..Default::default()
        },
    };

    let env = config.form_env(SimulatedForm::new());
    let agent = QTableAgent::<FormEnv<SimulatedForm>>::new(config.agent_config()?)?;
    let mut trainer = Trainer::new(env, agent, &config);
    let session = trainer.run()?;

    println!("{}", session.summary());
    if let Some(reason) = session.stop_reason() {
        println!("stopped: {reason:?}");
    }

    // Replay the greedy policy once
    let (mut env, agent) = trainer.into_parts();
    let mut state = env.reset()?;
    let actions = env.actions();
    for step in 1..=config.max_steps {
        let Some(action) = agent.best_action(&state, &actions).cloned() else {
            break;
        };
        let transition = env.step(&action)?;
        println!(
            "{step:>2}. {:<32} {:>6.2}  {}",
            action.to_string(),
            transition.reward,
            transition.next_state
        );
        state = transition.next_state;
        if transition.done {
            break;
        }
    }

    Ok(())
}
