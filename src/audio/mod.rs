// Module audio - Rendu temps-réel, sorties (cpal / hors ligne) et export

pub mod dsp_utils;
pub mod export;
pub mod format_conversion;
pub mod output;
pub mod parameters;
pub mod renderer;
pub mod timing;
