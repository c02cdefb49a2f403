// Core Domain
// チェンジレコード、設定、エラー、出力シンクなどの純粋なドメイン型

pub mod change;
pub mod config;
pub mod error;
pub mod naming;
pub mod options;
pub mod output;
