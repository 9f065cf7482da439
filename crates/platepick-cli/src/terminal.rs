use std::sync::{Arc, Mutex};
use std::time::Instant;

use platepick_core::controller::{Notice, NoticeKind, SearchObserver};
use platepick_core::models::{Location, Place};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::google::directions_url;

/// Latest notice and when it stops being shown.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<(String, Instant)>,
}

impl NoticeBoard {
    pub fn post(&mut self, notice: &Notice, now: Instant) {
        self.current = Some((notice.message.clone(), now + notice.dismiss_after));
    }

    pub fn visible(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((message, hide_at)) if now < *hide_at => Some(message.as_str()),
            _ => None,
        }
    }
}

pub type SharedNoticeBoard = Arc<Mutex<NoticeBoard>>;

/// Prints picks and notices to stdout. Tracks the current location so picks
/// can show how far away they are.
pub struct TerminalObserver {
    origin: Option<Location>,
    notices: SharedNoticeBoard,
}

impl TerminalObserver {
    pub fn new(notices: SharedNoticeBoard) -> Self {
        Self {
            origin: None,
            notices,
        }
    }
}

impl SearchObserver for TerminalObserver {
    fn picks_ready(&mut self, picks: &[Place]) {
        println!("[{}] picks:", timestamp());
        for (index, place) in picks.iter().enumerate() {
            println!("  {}", describe_pick(index + 1, place, self.origin.as_ref()));
            println!("     {}", directions_url(place));
        }
    }

    fn busy_changed(&mut self, busy: bool) {
        if busy {
            println!("[{}] searching... (type `go` again to cancel)", timestamp());
        } else {
            println!("[{}] idle", timestamp());
        }
    }

    fn notice(&mut self, notice: &Notice) {
        let prefix = match notice.kind {
            NoticeKind::Failure(_) => "!",
            NoticeKind::LocationUpdated => "*",
        };
        println!("[{}] {prefix} {}", timestamp(), notice.message);
        if let Ok(mut board) = self.notices.lock() {
            board.post(notice, Instant::now());
        }
    }

    fn location_changed(&mut self, location: &Location, label: &str) {
        self.origin = Some(*location);
        println!("[{}] location: {label}", timestamp());
    }
}

pub fn describe_pick(position: usize, place: &Place, origin: Option<&Location>) -> String {
    let mut line = format!("{position}. {} [{}]", place.name, place.price_label());

    if let Some(rating) = place.rating {
        line.push_str(&format!(" {rating:.1}*"));
        if let Some(count) = place.rating_count {
            line.push_str(&format!(" ({count})"));
        }
    }

    if let Some(origin) = origin {
        line.push_str(&format!(" {}", format_distance(place.distance_meters(origin))));
    }

    line
}

fn format_distance(meters: u64) -> String {
    if meters < 1000 {
        format!("{meters} m")
    } else {
        format!("{:.1} km", meters as f64 / 1000.0)
    }
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}
