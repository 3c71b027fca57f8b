use anyhow::Result;
use clap::Parser;
use log::info;
use perdqn::PerDqnCorridorConfig;
use perdqn_core::record::BufferedRecorder;

const MODEL_DIR: &str = "./model/per_dqn_corridor";

/// Train/eval PER-DQN agent in the corridor environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train PER-DQN agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate PER-DQN agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Configuration file in YAML
    #[arg(short, long)]
    config: Option<String>,

    /// Directory of model parameters
    #[arg(short, long, default_value_t = MODEL_DIR.to_string())]
    model_dir: String,

    /// Save the configuration used in this run to the given file
    #[arg(long)]
    save_config: Option<String>,
}

fn load_config(args: &Args) -> Result<PerDqnCorridorConfig> {
    let config = match &args.config {
        Some(path) => PerDqnCorridorConfig::load(path)?,
        None => PerDqnCorridorConfig::default(),
    };
    Ok(config.model_dir(args.model_dir.clone()))
}

fn train(config: &PerDqnCorridorConfig) -> Result<()> {
    let mut recorder = BufferedRecorder::new();
    let (_, stats) = perdqn::train(config, &mut recorder)?;
    let n = stats.len().min(10);
    let mean = stats.iter().rev().take(n).map(|s| s.reward).sum::<f32>() / n.max(1) as f32;
    info!("Mean reward of the last {} episodes: {:.3}", n, mean);
    Ok(())
}

fn eval(config: &PerDqnCorridorConfig, model_dir: &str) -> Result<()> {
    let mut agent = perdqn::load_agent(config, model_dir)?;
    let mut recorder = BufferedRecorder::new();
    let stats = perdqn::eval(config, &mut agent, &mut recorder)?;
    for s in stats.iter() {
        info!(
            "Test episode {}, reward = {:.2}, steps = {}",
            s.episode, s.reward, s.steps
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    if let Some(path) = &args.save_config {
        config.save(path)?;
    }

    if args.train {
        train(&config)?;
    } else if args.eval {
        eval(&config, &args.model_dir)?;
    } else {
        train(&config)?;
        eval(&config, &args.model_dir)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{eval, train};
    use anyhow::Result;
    use perdqn::PerDqnCorridorConfig;
    use tempdir::TempDir;

    #[test]
    fn test_per_dqn_corridor() -> Result<()> {
        let tmp_dir = TempDir::new("per_dqn_corridor")?;
        let model_dir = match tmp_dir.as_ref().to_str() {
            Some(s) => s,
            None => panic!("Failed to get string of temporary directory"),
        };
        let mut config = PerDqnCorridorConfig::default().model_dir(model_dir);
        config.trainer_config.train_episodes = 10;
        train(&config)?;
        eval(&config, model_dir)?;
        Ok(())
    }
}
