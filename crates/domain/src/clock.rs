//! # Clock
//!
//! 打刻時刻、勤務セッションの終了時刻、履歴検索の期間はすべてこのトレイト経由で
//! 決まる。テストでは [`FixedClock`] を注入して経過分数を固定する。

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
   fn now(&self) -> DateTime<Utc>;

   /// 現在から `days` 日前までの期間 `(from, to)`
   ///
   /// 日数が負、または表現できないほど大きい場合は `None`。
   fn lookback_days(&self, days: i64) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
      if days < 0 {
         return None;
      }
      let to = self.now();
      let from = to.checked_sub_signed(Duration::try_days(days)?)?;
      Some((from, to))
   }
}

pub struct SystemClock;

impl Clock for SystemClock {
   fn now(&self) -> DateTime<Utc> {
      Utc::now()
   }
}

/// 常に同じ時刻を返す
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
   pub fn new(now: DateTime<Utc>) -> Self {
      Self(now)
   }
}

impl Clock for FixedClock {
   fn now(&self) -> DateTime<Utc> {
      self.0
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;
   use rstest::rstest;

   use super::*;

   fn at() -> DateTime<Utc> {
      DateTime::from_timestamp(1_760_000_000, 0).unwrap()
   }

   #[rstest]
   #[case(0)]
   #[case(1)]
   #[case(30)]
   fn test_指定日数さかのぼった期間を返す(#[case] days: i64) {
      let clock = FixedClock::new(at());

      let (from, to) = clock.lookback_days(days).unwrap();

      assert_eq!(to, at());
      assert_eq!(to - from, Duration::days(days));
   }

   #[rstest]
   #[case(-1)]
   #[case(i64::MAX)]
   fn test_負や桁あふれする日数は期間にならない(#[case] days: i64) {
      assert_eq!(FixedClock::new(at()).lookback_days(days), None);
   }

   #[test]
   fn test_system_clockは呼び出し時点の時刻を返す() {
      let before = Utc::now();
      let now = SystemClock.now();

      assert!(before <= now && now <= Utc::now());
   }
}
