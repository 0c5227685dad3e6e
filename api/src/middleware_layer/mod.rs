pub mod api_key_auth;
