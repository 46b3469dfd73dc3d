use std::io::Write;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use auto_typer::job::{format_duration, parse_duration};
use auto_typer::{
    run_job, AutoTyperError, CancellationToken, FixedJitter, InputBackend, Job, LiveInjector,
    NullSink, Result, RunState, Scheduler, SimEvent, SimulatedInjector, Status, UniformJitter,
};
use tempfile::NamedTempFile;

fn simulated_job(message: &str, repeat: u32) -> Job {
    Job {
        message: message.to_string(),
        char_delay: Duration::ZERO,
        message_delay: Duration::ZERO,
        countdown: Duration::ZERO,
        repeat_count: repeat,
        simulate: true,
        ..Job::default()
    }
}

// Job file and duration parsing

#[test]
fn test_spam_job_config() {
    let json = r#"
    {
        "message": "never gonna give you up",
        "char_delay": "10ms",
        "message_delay": "2s",
        "jitter": "250ms",
        "press_enter": true,
        "repeat_count": 0,
        "countdown": "3s",
        "simulate": false
    }
    "#;

    let job: Job = serde_json::from_str(json).unwrap();

    assert_eq!(job.message, "never gonna give you up");
    assert_eq!(job.char_delay, Duration::from_millis(10));
    assert_eq!(job.message_delay, Duration::from_secs(2));
    assert_eq!(job.jitter, Some(Duration::from_millis(250)));
    assert!(job.press_enter);
    assert_eq!(job.repeat_count, 0);
    assert_eq!(job.countdown, Duration::from_secs(3));
    assert!(!job.simulate);

    assert!(job.validate().is_ok());
}

#[test]
fn test_job_file_operations() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;

    let json_content = r#"
    {
        "message": "status check",
        "char_delay": "0ms",
        "message_delay": "500ms",
        "repeat_count": 3,
        "countdown": "0s",
        "simulate": true
    }
    "#;

    temp_file.write_all(json_content.as_bytes())?;

    let job = Job::from_file(temp_file.path().to_str().unwrap())?;

    assert_eq!(job.message, "status check");
    assert_eq!(job.char_delay, Duration::ZERO);
    assert_eq!(job.message_delay, Duration::from_millis(500));
    assert_eq!(job.repeat_count, 3);
    assert!(job.simulate);
    // Fields absent from the file keep their defaults.
    assert_eq!(job.jitter, None);
    assert!(job.press_enter);

    assert!(job.validate().is_ok());

    Ok(())
}

#[test]
fn test_duration_parsing_edge_cases() {
    // Valid cases
    assert_eq!(parse_duration("0ms").unwrap(), Duration::from_millis(0));
    assert_eq!(parse_duration("1000").unwrap(), Duration::from_millis(1000));
    assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5)); // Case insensitive
    assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120)); // Whitespace
    assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500)); // Fractional

    // Invalid cases
    assert!(parse_duration("").is_err());
    assert!(parse_duration("abc").is_err());
    assert!(parse_duration("1000x").is_err());
    assert!(parse_duration("-1000ms").is_err());
}

#[test]
fn test_duration_formatting() {
    assert_eq!(format_duration(Duration::from_millis(30)), "30ms");
    assert_eq!(format_duration(Duration::from_secs(5)), "5s");
    assert_eq!(format_duration(Duration::from_secs(120)), "2m");
}

#[test]
fn test_job_validation_errors() {
    let mut job = Job::default();
    assert!(matches!(job.validate(), Err(AutoTyperError::EmptyMessage)));

    job.message = "\t \n".to_string();
    assert!(job.validate().is_err());

    job.message = "ok".to_string();
    assert!(job.validate().is_ok());
}

#[test]
fn test_default_values() {
    let json = r#"
    {
        "message": "minimal"
    }
    "#;

    let job: Job = serde_json::from_str(json).unwrap();
    assert_eq!(job.message, "minimal");
    assert_eq!(job.char_delay, Duration::from_millis(30)); // default
    assert_eq!(job.message_delay, Duration::from_millis(1500)); // default
    assert_eq!(job.jitter, None); // default
    assert!(job.press_enter); // default true
    assert_eq!(job.repeat_count, 10); // default
    assert_eq!(job.countdown, Duration::from_secs(5)); // default
    assert!(!job.simulate); // default false

    assert!(job.validate().is_ok());
}

#[test]
fn test_job_save_load_roundtrip() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let job_path = temp_dir.path().join("test_job.json");

    let original = Job {
        message: "round trip".to_string(),
        char_delay: Duration::from_millis(15),
        message_delay: Duration::from_millis(2500),
        jitter: Some(Duration::from_millis(400)),
        press_enter: false,
        repeat_count: 7,
        countdown: Duration::from_secs(2),
        simulate: true,
    };

    original.save_to_file(job_path.to_str().unwrap())?;
    let loaded = Job::from_file(job_path.to_str().unwrap())?;

    assert_eq!(loaded.message, original.message);
    assert_eq!(loaded.char_delay, original.char_delay);
    assert_eq!(loaded.message_delay, original.message_delay);
    assert_eq!(loaded.jitter, original.jitter);
    assert_eq!(loaded.press_enter, original.press_enter);
    assert_eq!(loaded.repeat_count, original.repeat_count);
    assert_eq!(loaded.countdown, original.countdown);
    assert_eq!(loaded.simulate, original.simulate);

    Ok(())
}

// Run engine properties

#[test]
fn test_bounded_run_emits_exactly_n_messages() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let job = simulated_job("hi", 2);

    let state = run_job(&job, &token, &injector, &NullSink, &FixedJitter(0.0));

    assert_eq!(state, RunState::Completed);
    assert_eq!(
        injector.events(),
        vec![
            SimEvent::Typed("hi".to_string()),
            SimEvent::Enter,
            SimEvent::Typed("hi".to_string()),
            SimEvent::Enter,
        ]
    );
}

#[test]
fn test_terminator_marker_tracks_press_enter_flag() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let job = Job {
        press_enter: false,
        ..simulated_job("abc", 4)
    };

    let state = run_job(&job, &token, &injector, &NullSink, &FixedJitter(0.0));

    assert_eq!(state, RunState::Completed);
    assert_eq!(injector.typed_messages().len(), 4);
    assert!(!injector.events().contains(&SimEvent::Enter));
}

#[test]
fn test_unbounded_run_stops_on_cancel() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let remote = token.clone();
    let job = Job {
        message_delay: Duration::from_millis(200),
        ..simulated_job("hi", 0)
    };

    let worker = thread::spawn({
        let injector = injector.clone();
        move || run_job(&job, &remote, &injector, &NullSink, &FixedJitter(0.0))
    });

    thread::sleep(Duration::from_millis(500));
    token.cancel();
    let state = worker.join().unwrap();

    assert_eq!(state, RunState::Stopped);
    let emitted = injector.typed_messages().len();
    assert!(emitted >= 1);
    // 500ms of 200ms waits leaves no room for anywhere near ten messages.
    assert!(emitted <= 10, "emitted {emitted} messages in 500ms");
}

#[test]
fn test_cancel_during_countdown_emits_nothing() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let remote = token.clone();
    let job = Job {
        countdown: Duration::from_secs(30),
        ..simulated_job("hi", 1)
    };

    let worker = thread::spawn({
        let injector = injector.clone();
        move || run_job(&job, &remote, &injector, &NullSink, &FixedJitter(0.0))
    });

    thread::sleep(Duration::from_millis(150));
    token.cancel();
    let state = worker.join().unwrap();

    assert_eq!(state, RunState::Stopped);
    assert!(injector.events().is_empty());
}

#[test]
fn test_cancel_during_long_wait_is_bounded() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let remote = token.clone();
    // A ten-minute wait must still stop within roughly one poll interval.
    let job = Job {
        message_delay: Duration::from_secs(600),
        ..simulated_job("hi", 0)
    };

    let worker = thread::spawn({
        let injector = injector.clone();
        move || run_job(&job, &remote, &injector, &NullSink, &FixedJitter(0.0))
    });

    thread::sleep(Duration::from_millis(300));
    let cancelled_at = Instant::now();
    token.cancel();
    let state = worker.join().unwrap();

    assert_eq!(state, RunState::Stopped);
    assert!(
        cancelled_at.elapsed() < Duration::from_millis(400),
        "stop took {:?}",
        cancelled_at.elapsed()
    );
    assert_eq!(injector.typed_messages().len(), 1);
}

#[test]
fn test_cancel_mid_emission_stops_promptly() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let remote = token.clone();
    // 80 chars at 100ms each is 8s of typing if left alone.
    let job = Job {
        char_delay: Duration::from_millis(100),
        ..simulated_job(&"x".repeat(80), 1)
    };

    let worker = thread::spawn({
        let injector = injector.clone();
        move || run_job(&job, &remote, &injector, &NullSink, &FixedJitter(0.0))
    });

    thread::sleep(Duration::from_millis(300));
    let cancelled_at = Instant::now();
    token.cancel();
    let state = worker.join().unwrap();

    assert_eq!(state, RunState::Stopped);
    assert!(cancelled_at.elapsed() < Duration::from_millis(400));
    let typed = &injector.typed_messages()[0];
    assert!(typed.len() < 80, "typed all {} chars", typed.len());
}

#[test]
fn test_empty_message_fails_immediately() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let (tx, rx) = mpsc::channel();
    let job = Job {
        countdown: Duration::from_secs(60),
        ..simulated_job("   \t ", 5)
    };

    let start = Instant::now();
    let state = run_job(&job, &token, &injector, &tx, &FixedJitter(0.0));
    drop(tx);

    assert_eq!(state, RunState::Failed);
    assert!(injector.events().is_empty());
    assert!(start.elapsed() < Duration::from_millis(100));

    let statuses: Vec<Status> = rx.iter().collect();
    assert!(matches!(statuses.last(), Some(Status::Failed(_))));
}

#[test]
fn test_jittered_delays_stay_within_bounds() {
    // Sampling the delay computation directly covers the bound; a seeded
    // source keeps it reproducible.
    let source = UniformJitter::with_seed(2024);
    let base = Duration::from_millis(400);
    let range = Duration::from_millis(150);
    for _ in 0..2000 {
        let delay = auto_typer::jittered_delay(base, Some(range), &source);
        assert!(delay >= Duration::from_millis(250) - Duration::from_micros(1));
        assert!(delay <= Duration::from_millis(550) + Duration::from_micros(1));
    }
}

#[test]
fn test_status_sequence_for_complete_run() {
    let injector = SimulatedInjector::new();
    let token = CancellationToken::new();
    let (tx, rx) = mpsc::channel();
    let job = Job {
        countdown: Duration::from_secs(2),
        ..simulated_job("hi", 2)
    };

    let state = run_job(&job, &token, &injector, &tx, &FixedJitter(0.0));
    drop(tx);

    assert_eq!(state, RunState::Completed);
    let statuses: Vec<Status> = rx.iter().collect();
    assert_eq!(
        statuses,
        vec![
            Status::Ready,
            Status::CountdownTick(2),
            Status::CountdownTick(1),
            Status::Emitting {
                iteration: 1,
                simulated: true
            },
            Status::Emitting {
                iteration: 2,
                simulated: true
            },
            Status::Completed,
        ]
    );
}

#[test]
fn test_status_lines_read_like_the_ui() {
    assert_eq!(Status::CountdownTick(3).to_string(), "Starting in 3...");
    assert_eq!(
        Status::Emitting {
            iteration: 2,
            simulated: true
        }
        .to_string(),
        "Typing message 2 (simulated)..."
    );
    assert_eq!(Status::Stopped.to_string(), "Stopped.");
    assert_eq!(Status::Completed.to_string(), "Completed.");
}

// Live injector boundary

struct FailingBackend;

impl InputBackend for FailingBackend {
    fn available(&self) -> bool {
        true
    }

    fn type_text(&self, _text: &str, _interval: Duration) -> Result<()> {
        Err(AutoTyperError::emission("synthetic backend failure"))
    }

    fn press_key(&self, _key: &str) -> Result<()> {
        Err(AutoTyperError::emission("synthetic backend failure"))
    }
}

struct OfflineBackend;

impl InputBackend for OfflineBackend {
    fn available(&self) -> bool {
        false
    }

    fn type_text(&self, _text: &str, _interval: Duration) -> Result<()> {
        Err(AutoTyperError::unsupported_platform("offline"))
    }

    fn press_key(&self, _key: &str) -> Result<()> {
        Err(AutoTyperError::unsupported_platform("offline"))
    }
}

#[test]
fn test_backend_failure_surfaces_as_failed_run() {
    let injector = LiveInjector::new(Box::new(FailingBackend));
    let token = CancellationToken::new();
    let (tx, rx) = mpsc::channel();
    let job = Job {
        simulate: false,
        ..simulated_job("hi", 3)
    };

    let state = run_job(&job, &token, &injector, &tx, &FixedJitter(0.0));
    drop(tx);

    assert_eq!(state, RunState::Failed);
    let statuses: Vec<Status> = rx.iter().collect();
    // First emission attempt fails; no retry, single terminal report.
    let failures = statuses
        .iter()
        .filter(|s| matches!(s, Status::Failed(_)))
        .count();
    assert_eq!(failures, 1);
}

#[test]
fn test_unready_backend_rejects_live_run() {
    let injector = LiveInjector::new(Box::new(OfflineBackend));
    let token = CancellationToken::new();
    let job = Job {
        simulate: false,
        ..simulated_job("hi", 1)
    };

    let state = run_job(&job, &token, &injector, &NullSink, &FixedJitter(0.0));

    assert_eq!(state, RunState::Failed);
}

// Scheduler control surface

#[tokio::test]
async fn test_scheduler_completes_and_reports() {
    let injector = SimulatedInjector::new();
    let (tx, rx) = mpsc::channel();
    let scheduler = Scheduler::new(Arc::new(injector.clone()), Arc::new(tx));

    scheduler.start(simulated_job("hello", 2)).unwrap();
    let state = scheduler.wait().await;

    assert_eq!(state, Some(RunState::Completed));
    assert_eq!(injector.typed_messages().len(), 2);
    let statuses: Vec<Status> = rx.try_iter().collect();
    assert_eq!(statuses.last(), Some(&Status::Completed));
}

#[tokio::test]
async fn test_start_while_running_is_rejected() {
    let injector = SimulatedInjector::new();
    let scheduler = Scheduler::new(Arc::new(injector.clone()), Arc::new(NullSink));
    let long_job = Job {
        message_delay: Duration::from_secs(600),
        ..simulated_job("busy", 0)
    };

    scheduler.start(long_job).unwrap();
    let second = scheduler.start(simulated_job("queue jumper", 1));
    assert!(matches!(second, Err(AutoTyperError::AlreadyRunning)));
    assert!(scheduler.is_running());

    // Let the active run type its first message, then stop it mid-wait.
    while injector.typed_messages().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    scheduler.cancel();
    assert_eq!(scheduler.wait().await, Some(RunState::Stopped));
    // Only the first job's message was ever typed.
    assert_eq!(injector.typed_messages(), vec!["busy".to_string()]);
}

#[tokio::test]
async fn test_live_start_with_offline_backend_fails_fast() {
    let injector = LiveInjector::new(Box::new(OfflineBackend));
    let scheduler = Scheduler::new(Arc::new(injector), Arc::new(NullSink));
    let job = Job {
        simulate: false,
        ..simulated_job("hi", 1)
    };

    let result = scheduler.start(job);
    assert!(matches!(
        result,
        Err(AutoTyperError::InjectorUnavailable(_))
    ));
    assert!(!scheduler.is_running());
}

// Error type display

#[test]
fn test_error_types() {
    let err = AutoTyperError::EmptyMessage;
    assert_eq!(err.to_string(), "message is empty");

    let err = AutoTyperError::emission("window closed");
    assert!(err.to_string().contains("window closed"));

    let err = AutoTyperError::invalid_duration("99q", "expected a number");
    assert!(err.to_string().contains("99q"));

    let err = AutoTyperError::AlreadyRunning;
    assert!(err.to_string().contains("already active"));
}
