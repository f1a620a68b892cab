// Module synthèse - Sources, filtres, enveloppes et recettes de batterie

pub mod drums;
pub mod envelope;
pub mod filter;
pub mod kit;
pub mod noise;
pub mod oscillator;
pub mod voice;
