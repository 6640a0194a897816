pub mod http_custodian;
