pub mod information;
