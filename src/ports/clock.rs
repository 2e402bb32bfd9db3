use chrono::{DateTime, Utc};

/// 時計ポート
///
/// 貸出可否・延滞料金の判定に使う「現在時刻」を注入する。
/// テストでは固定時計を差し込み、経過日数を決定的に再現する。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
