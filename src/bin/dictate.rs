//! Interactive dictation client: capture from the default microphone, relay
//! the take through a voice-relay server, and print the transcript.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use voice_relay::{
    HttpRelay, Notice, NoticeSeverity, NotificationSink, RecordingSession, SessionConfig,
    VoiceInputController,
};

#[derive(Debug, Parser)]
#[command(name = "dictate", about = "Dictate into a form field via the voice relay")]
struct Args {
    /// Base URL of the relay server
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Hard ceiling on the recording, in seconds
    #[arg(long, default_value_t = 60)]
    max_seconds: u64,
}

struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            NoticeSeverity::Info => println!("{}: {}", notice.title, notice.body),
            NoticeSeverity::Alert => eprintln!("{}: {}", notice.title, notice.body),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let session = RecordingSession::new(SessionConfig {
        max_duration: Duration::from_secs(args.max_seconds),
        ..SessionConfig::default()
    });
    let relay = Arc::new(HttpRelay::new(&args.server)?);

    let (transcript_tx, mut transcript_rx) = tokio::sync::mpsc::channel::<String>(1);
    let controller = VoiceInputController::new(session, relay, Arc::new(ConsoleSink), move |text| {
        let _ = transcript_tx.try_send(text);
    });

    controller.start_recording().await?;
    println!("Press Enter to stop recording.");

    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
    })
    .await?;

    controller.stop_recording().await;

    // The cycle ends either with a transcript or with a notice already
    // printed by the sink.
    match tokio::time::timeout(Duration::from_secs(90), transcript_rx.recv()).await {
        Ok(Some(text)) => println!("\n{}", text),
        _ => {}
    }

    Ok(())
}
