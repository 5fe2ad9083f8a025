mod common;

mod credentials;
