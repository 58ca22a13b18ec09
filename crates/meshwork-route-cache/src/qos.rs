//! Quality-of-service scores.
//!
//! Higher is better. Scores live in `[QOS_LEVEL_MIN, QOS_LEVEL_MAX]`;
//! [`QOS_LEVEL_UNKNOWN`] stands for "no data" and sits outside that range.

/// A signed route quality score.
pub type Qos = i8;

pub const QOS_LEVEL_MIN: Qos = 0;
pub const QOS_LEVEL_MAX: Qos = 15;
/// Score given to a freshly admitted route.
pub const QOS_LEVEL_AVERAGE: Qos = 7;
pub const QOS_LEVEL_UNKNOWN: Qos = i8::MIN;

/// How [`crate::RouteCache::aggregate_qos`] folds a destination's scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QosCalculation {
    Best,
    Worst,
    Average,
}

/// Clamp `qos` into range, leaving [`QOS_LEVEL_UNKNOWN`] untouched.
pub fn normalize_qos(qos: i16) -> Qos {
    if qos == QOS_LEVEL_UNKNOWN as i16 {
        QOS_LEVEL_UNKNOWN
    } else {
        qos.clamp(QOS_LEVEL_MIN as i16, QOS_LEVEL_MAX as i16) as Qos
    }
}
