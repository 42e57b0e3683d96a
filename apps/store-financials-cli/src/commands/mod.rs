pub mod check_connection;
pub mod init;
pub mod load;
pub mod validate;
