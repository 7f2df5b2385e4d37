//! Count example - tally the built-in keywords in a filing once the host says it is ready

use dom::DomService;
use highlighter::{HighlightSession, HighlighterConfig, HostEvent, RunMode, SessionConfig};

const FILING: &str = "<html><head></head><body>\
<p>Foreign currency forward contracts hedge $3.2 billion of forecasted revenue.</p>\
<p>The net gain on cash flow hedges reclassified from AOCI into income was immaterial.</p>\
</body></html>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let settings = HighlighterConfig {
        mode: RunMode::Count,
        ..HighlighterConfig::default()
    };
    let session = HighlightSession::new(SessionConfig::default(), settings);
    println!("Created highlight session: {}", session.config.id);

    // Subscribe before the host signals
    let events = session.subscribe();
    let mut doc = DomService::from_html(FILING)?;

    session.event_bus.publish(HostEvent::DocumentReady {
        url: "file:///tmp/10K/DEMO/2024-01-31.html".to_string(),
    });

    match session.run_when_ready(events, &mut doc).await {
        Some(report) => {
            for entry in report.counts.nonzero() {
                println!("{:>4}  {}", entry.count, entry.pattern);
            }
        }
        None => println!("Document was not processed"),
    }

    Ok(())
}
