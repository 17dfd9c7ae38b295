//! Signal evaluation: current price against the latest indicator row.
//!
//! Rules, first match wins:
//! 1. SMA undefined → Neutral
//! 2. close >= upper band → Overbought
//! 3. close <= lower band → Oversupported
//! 4. close > SMA → Bullish
//! 5. otherwise → Bearish

use crate::domain::indicator::IndicatorRow;
use std::fmt;

/// RSI level at or above which a bullish posture stops adding exposure.
pub const RSI_CEILING: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Bullish,
    Bearish,
    Overbought,
    Oversupported,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Hold,
    Sell,
}

pub fn evaluate(current_close: f64, indicators: &IndicatorRow) -> Signal {
    let Some(sma) = indicators.sma else {
        return Signal::Neutral;
    };

    if let Some(bands) = indicators.bollinger {
        if current_close >= bands.upper {
            return Signal::Overbought;
        }
        if current_close <= bands.lower {
            return Signal::Oversupported;
        }
    }

    if current_close > sma {
        Signal::Bullish
    } else {
        Signal::Bearish
    }
}

impl Signal {
    /// Trading action for this posture. A bullish trend with RSI at or
    /// above [`RSI_CEILING`] holds rather than buys.
    pub fn action(&self, rsi: Option<f64>) -> Action {
        match self {
            Signal::Bullish => match rsi {
                Some(r) if r >= RSI_CEILING => Action::Hold,
                _ => Action::Buy,
            },
            Signal::Oversupported => Action::Buy,
            Signal::Bearish | Signal::Overbought => Action::Sell,
            Signal::Neutral => Action::Hold,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Bullish => write!(f, "bullish"),
            Signal::Bearish => write!(f, "bearish"),
            Signal::Overbought => write!(f, "overbought"),
            Signal::Oversupported => write!(f, "oversupported"),
            Signal::Neutral => write!(f, "neutral"),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Hold => write!(f, "HOLD"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}
