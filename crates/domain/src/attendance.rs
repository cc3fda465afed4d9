//! # 打刻判定
//!
//! 直前の打刻記録と端末から届いた打刻シグナルから、
//! 記録すべき打刻種別と、閉じるべき勤務セッションの区間を決める。
//!
//! ## 在室判定
//!
//! 直前の記録が入室系（`ENTRADA` / `FIN_PAUSA` / `VUELTA_MEDICO`）で、
//! かつ許可された打刻であれば「在室中」とする。記録がなければ不在。
//!
//! ## シグナルと打刻種別の対応
//!
//! | シグナル | 在室中 | 不在 |
//! |---------|-------|------|
//! | なし（トグル） | `SALIDA` | `ENTRADA` |
//! | `PAUSA` | `INICIO_PAUSA` | `FIN_PAUSA` |
//! | `MEDICO` | `CONSULTA` | `ENTRADA` |
//! | 明示的な種別 | そのまま | そのまま |
//!
//! `MEDICO` で戻ったときの `VUELTA_MEDICO` は `ENTRADA` に正規化する。
//!
//! ## 勤務セッション
//!
//! 在室中に退室系（`SALIDA` / `INICIO_PAUSA` / `CONSULTA`）の打刻をすると、
//! 直前の記録の時刻から現在時刻までの区間が勤務セッションとして閉じられる。
//!
//! アプリからの手動打刻（[`decide_manual`]）は規則が狭い。直前の記録が `ENTRADA` で、
//! 今回の打刻が `SALIDA` のときだけ勤務セッションを閉じる。
//!
//! この判定は副作用を持たない。記録の書き込みはユースケース層が行う。

use chrono::{DateTime, Utc};

use crate::{
    DomainError,
    presence::{MovementType, PresenceRecord},
};

/// 端末・アプリから届く打刻シグナル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceSignal {
    /// 種別指定なし。在室状態を反転する
    Toggle,
    /// 休憩ボタン
    Pause,
    /// 通院ボタン
    Medical,
    /// 打刻種別の明示指定
    Explicit(MovementType),
}

impl AttendanceSignal {
    /// リクエストの `tipo` を解釈する
    ///
    /// 未指定・空文字列はトグル。`INTENTO` はサーバーだけが書き込む種別なので受け付けない。
    ///
    /// # エラー
    ///
    /// 未知の種別、または `INTENTO` の場合は `DomainError::Validation` を返す。
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::Toggle),
            Some(raw) => raw,
        };

        match raw {
            "PAUSA" => Ok(Self::Pause),
            "MEDICO" => Ok(Self::Medical),
            _ => match raw.parse::<MovementType>()? {
                MovementType::Intento => Err(DomainError::Validation(
                    "INTENTO は打刻種別として指定できません".to_string(),
                )),
                movement => Ok(Self::Explicit(movement)),
            },
        }
    }
}

/// 勤務セッションとして閉じる区間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSpan {
    pub start: DateTime<Utc>,
    pub end:   DateTime<Utc>,
}

impl SessionSpan {
    /// 経過分数（切り捨て）
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// 打刻判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceDecision {
    /// 打刻前に在室中だったか
    pub was_inside:     bool,
    /// 記録する打刻種別
    pub movement:       MovementType,
    /// 閉じる勤務セッション（退室系の打刻で在室中だった場合のみ）
    pub closed_session: Option<SessionSpan>,
}

/// 直前の記録から在室中かどうかを判定する
pub fn is_inside(last: Option<&PresenceRecord>) -> bool {
    last.is_some_and(|record| record.access_granted() && record.movement().is_entry_like())
}

/// シグナルと在室状態から打刻種別を決める
pub fn resolve_movement(signal: AttendanceSignal, was_inside: bool) -> MovementType {
    match (signal, was_inside) {
        (AttendanceSignal::Toggle, true) => MovementType::Salida,
        (AttendanceSignal::Toggle, false) => MovementType::Entrada,
        (AttendanceSignal::Pause, true) => MovementType::InicioPausa,
        (AttendanceSignal::Pause, false) => MovementType::FinPausa,
        (AttendanceSignal::Medical, true) => MovementType::Consulta,
        // 通院からの戻りは入室として扱う
        (AttendanceSignal::Medical, false) => MovementType::Entrada,
        (AttendanceSignal::Explicit(movement), _) => movement,
    }
}

/// 打刻を判定する
///
/// # 使用例
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use presencia_domain::{
///     attendance::{AttendanceSignal, decide},
///     presence::{AuthMethod, MovementType, PresenceRecord},
/// };
///
/// let now = Utc::now();
/// let entry = PresenceRecord::granted(
///     "borja",
///     AuthMethod::Token,
///     MovementType::Entrada,
///     "Acceso Correcto",
///     now - Duration::minutes(90),
/// );
///
/// let decision = decide(Some(&entry), AttendanceSignal::Toggle, now);
///
/// assert_eq!(decision.movement, MovementType::Salida);
/// assert_eq!(decision.closed_session.unwrap().duration_minutes(), 90);
/// ```
pub fn decide(
    last: Option<&PresenceRecord>,
    signal: AttendanceSignal,
    now: DateTime<Utc>,
) -> AttendanceDecision {
    let was_inside = is_inside(last);
    let movement = resolve_movement(signal, was_inside);

    let closed_session = match last {
        Some(record) if was_inside && movement.is_exit_like() => Some(SessionSpan {
            start: record.timestamp(),
            end:   now,
        }),
        _ => None,
    };

    AttendanceDecision {
        was_inside,
        movement,
        closed_session,
    }
}

/// アプリからの手動打刻を判定する
///
/// 打刻種別の決め方は [`decide`] と同じ。勤務セッションを閉じるのは
/// 許可された `ENTRADA` の直後に `SALIDA` を打刻した場合だけで、
/// 休憩開始・通院外出ではセッションを記録しない。
pub fn decide_manual(
    last: Option<&PresenceRecord>,
    signal: AttendanceSignal,
    now: DateTime<Utc>,
) -> AttendanceDecision {
    let was_inside = is_inside(last);
    let movement = resolve_movement(signal, was_inside);

    let closed_session = match last {
        Some(record)
            if movement == MovementType::Salida
                && record.access_granted()
                && record.movement() == MovementType::Entrada =>
        {
            Some(SessionSpan {
                start: record.timestamp(),
                end:   now,
            })
        }
        _ => None,
    };

    AttendanceDecision {
        was_inside,
        movement,
        closed_session,
    }
}
