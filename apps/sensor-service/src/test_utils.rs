//! # テストユーティリティ
//!
//! ユースケース・ハンドラ・統合テストで共有するセットアップ。

mod sensor_test_builder;

pub use sensor_test_builder::{SensorTestBuilder, SensorTestSetup};
