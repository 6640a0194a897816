pub mod http_validator_client;
