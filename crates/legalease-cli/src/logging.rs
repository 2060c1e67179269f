use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Initialise `log` output and the `tracing` subscriber for the page state
/// crate. `RUST_LOG` wins over the debug flag for both.
pub fn init_logging(debug: bool) {
    let filter = if debug { "debug" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}] {} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    // `SubscriberInitExt::init` would also claim the `log` facade, which
    // env_logger already owns.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    if let Err(err) =
        tracing::subscriber::set_global_default(tracing_output(env_filter, std::io::stderr))
    {
        log::warn!("Tracing output unavailable: {}", err);
    }
}

fn tracing_output<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(false)
            .with_writer(writer),
    )
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use scenario_state::{ScenarioEvent, ScenarioMachine};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn stale_response_warning_is_written() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_output(EnvFilter::new("warn"), move || writer.clone());

        tracing::subscriber::with_default(subscriber, || {
            let mut machine = ScenarioMachine::new();
            let stale = machine.begin_load();
            machine.begin_load();
            let transition = machine
                .handle_event(ScenarioEvent::LoadFailed {
                    ticket: stale,
                    error: "late".to_string(),
                })
                .unwrap();
            assert!(!transition.applied);
        });

        let output = captured.text();
        assert!(output.contains("dropping stale response"), "{output}");
        assert!(output.contains("WARN"));
    }

    #[test]
    fn transitions_are_hidden_below_debug() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_output(EnvFilter::new("warn"), move || writer.clone());

        tracing::subscriber::with_default(subscriber, || {
            let mut machine = ScenarioMachine::new();
            machine.begin_load();
        });

        assert!(!captured.text().contains("scenario transition"));
    }
}
