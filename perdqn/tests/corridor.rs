use anyhow::Result;
use perdqn::{eval, load_agent, train, PerDqnCorridorConfig};
use perdqn_core::{
    record::{BufferedRecorder, NullRecorder},
    QFunction,
};
use tempdir::TempDir;

#[test]
fn test_learns_corridor() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = PerDqnCorridorConfig::default();
    let length = config.env_config.length;
    let mut recorder = BufferedRecorder::new();
    let (mut agent, stats) = train(&config, &mut recorder)?;
    assert_eq!(stats.len(), config.trainer_config.train_episodes);
    assert!(agent.n_opts() > 0);

    // Episode records and optimization records.
    assert!(recorder.len() > stats.len());

    // Moving right is better than moving left in every cell but the goal.
    for pos in 0..length - 1 {
        let mut obs = vec![0.0; length];
        obs[pos] = 1.0;
        let q = agent.qnet().forward(&obs);
        assert!(q[1] > q[0], "pos = {}, q = {:?}", pos, q);
    }

    let mut recorder = BufferedRecorder::new();
    let stats = eval(&config, &mut agent, &mut recorder)?;
    assert_eq!(stats.len(), config.trainer_config.test_episodes);
    for s in stats.iter() {
        assert_eq!(s.reward, 1.0);
        assert_eq!(s.steps, length - 1);
    }
    Ok(())
}

#[test]
fn test_saved_agent_is_greedy() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let tmp_dir = TempDir::new("corridor")?;
    let model_dir = tmp_dir.path().to_str().unwrap().to_string();
    let config = PerDqnCorridorConfig::default().model_dir(model_dir.clone());
    let (agent, _) = train(&config, &mut NullRecorder::new())?;

    let agent_ = load_agent(&config, &model_dir)?;
    let obs = {
        let mut obs = vec![0.0; config.env_config.length];
        obs[0] = 1.0;
        obs
    };
    assert_eq!(agent.qnet().forward(&obs), agent_.qnet().forward(&obs));
    Ok(())
}
