mod eod_client_http;
mod questdb_writer;
