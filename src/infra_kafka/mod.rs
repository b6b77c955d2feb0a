mod withdrawal_publisher_kafka;

pub use withdrawal_publisher_kafka::*;
