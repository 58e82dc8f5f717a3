//! The interactive loop: look up a callsign, show prior contacts, and
//! optionally log a new one, until the operator quits.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use qrzlog::prelude::*;

use crate::render;

/// Line-oriented prompt over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one trimmed line. `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn say(&mut self, text: impl fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

/// What happened during one interactive run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub lookups: u32,
    pub contacts_logged: u32,
    pub elapsed: Duration,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You looked up {} callsign(s) and logged {} contact(s) in a total runtime of {} (h:m:s)",
            self.lookups,
            self.contacts_logged,
            render::format_runtime(self.elapsed)
        )
    }
}

/// Runs the loop until the operator enters `q`, declines to continue
/// after logging, or input ends.
///
/// Band and mode are asked once and apply to every contact. Per-action
/// failures are printed and the loop goes on; only a fatal session error
/// ends the run with `Err`.
pub async fn run<T, R, W, C>(
    client: &QrzClient<T>,
    console: &mut Console<R, W>,
    now: C,
) -> anyhow::Result<SessionSummary>
where
    T: HttpTransport,
    R: BufRead,
    W: Write,
    C: Fn() -> DateTime<Utc>,
{
    let started = Instant::now();
    let mut summary = SessionSummary::default();

    let Some(band) = console.ask("Enter the band you are using (e.g. 10m, 40m): ")? else {
        return Ok(summary);
    };
    let Some(mode) = console.ask("Enter the mode you are using (e.g. FT8, SSB): ")? else {
        return Ok(summary);
    };
    let band = band.to_uppercase();
    let mode = mode.to_uppercase();

    loop {
        let Some(callsign) = console.ask("Enter the callsign you wish to search for (\"q\" to quit): ")? else {
            break;
        };
        let callsign = callsign.to_uppercase();
        if callsign.is_empty() {
            console.say("You entered a blank callsign. Please try again.")?;
            continue;
        }
        if callsign == "Q" {
            break;
        }

        summary.lookups += 1;
        match client.directory().lookup(&callsign).await {
            Ok(record) => console.say(&record)?,
            Err(QrzlogError::NotFound { reason, .. }) => {
                console.say(reason)?;
                continue;
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(%callsign, error = %e, "lookup failed");
                console.say(format!("Lookup failed: {e}"))?;
                continue;
            }
        }

        match client.logbook().query_by_callsign(&callsign).await {
            Ok(qsos) => console.say(render::history(&callsign, &qsos))?,
            Err(e) => console.say(format!("Couldn't read your logbook: {e}"))?,
        }

        let answer = console.ask(&format!("\nDo you wish to start a contact with {callsign} (y/n)?: "))?;
        if !is_yes(answer.as_deref()) {
            continue;
        }

        let start = now();
        let Some(rst_sent) = console.ask("Enter the signal report you sent to the other station (e.g. 59): ")? else {
            break;
        };
        let Some(rst_rcvd) = console.ask("Enter the signal report you received from the other station: ")? else {
            break;
        };
        console.ask("Hit enter to end the QSO")?;
        let end = now();

        let draft = ContactDraft {
            call: callsign.clone(),
            band: band.clone(),
            mode: mode.clone(),
            qso_date: render::qso_date(start),
            time_on: render::qso_time(start),
            time_off: render::qso_time(end),
            rst_sent,
            rst_rcvd,
        };
        match client.logbook().add_contact(&draft).await {
            Ok(_) => {
                summary.contacts_logged += 1;
                console.say(format!("Contact with {callsign} logged successfully."))?;
            }
            Err(QrzlogError::LogWriteFailed(status)) => {
                console.say(format!("Couldn't log contact with {callsign} ({status})"))?;
            }
            Err(e) => console.say(format!("Couldn't log contact with {callsign}: {e}"))?,
        }

        let again = console.ask("Search for another contact (y/n)?: ")?;
        if !is_yes(again.as_deref()) {
            break;
        }
    }

    summary.elapsed = started.elapsed();
    Ok(summary)
}

fn is_yes(answer: Option<&str>) -> bool {
    matches!(answer, Some(a) if a.eq_ignore_ascii_case("y"))
}
