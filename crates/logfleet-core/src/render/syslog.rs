//! Syslog formats. Neither carries a level the backend would map, so lines
//! are rendered unleveled.

use super::{Line, RFC3164_TIME, RFC5424_TIME};
use crate::values;
use chrono::{DateTime, Utc};
use fake::Fake;
use fake::faker::internet::en::Username;
use rand::Rng;

/// `<priority>{timestamp} {hostname} {application}[{pid}]: {message}`
pub fn rfc3164<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> Line {
    let host: String = Username().fake_with_rng(rng);
    Line::unleveled(format!(
        "<{}>{} {} {}[{}]: {}",
        rng.random_range(0..=191),
        t.format(RFC3164_TIME),
        host.to_lowercase(),
        values::random_word(rng).to_lowercase(),
        rng.random_range(1..=10_000),
        values::random_phrase(rng),
    ))
}

/// `<priority>{version} {iso-timestamp} {hostname} {application} {pid} {message-id} {structured-data} {message}`
pub fn rfc5424<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> Line {
    Line::unleveled(format!(
        "<{}>{} {} {} {} {} ID{} {} {}",
        rng.random_range(0..=191),
        rng.random_range(1..=3),
        t.format(RFC5424_TIME),
        values::random_domain(rng),
        values::random_word(rng).to_lowercase(),
        rng.random_range(1..=10_000),
        rng.random_range(1..=1000),
        "-",
        values::random_phrase(rng),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_rfc3164_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap();
        let line = rfc3164(&mut rng, t);

        assert!(line.level.is_none());
        assert!(line.message.starts_with('<'));
        assert!(line.message.contains(">Mar 01 08:15:00 "), "{}", line.message);
        assert!(line.message.contains("]: "));
    }

    #[test]
    fn test_rfc5424_shape() {
        let mut rng = StdRng::seed_from_u64(4);
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap();
        let line = rfc5424(&mut rng, t);

        assert!(line.level.is_none());
        assert!(line.message.contains(" 2024-03-01T08:15:00.000Z "), "{}", line.message);
        assert!(line.message.contains(" ID"));
        assert!(line.message.contains(" - "));
    }
}
