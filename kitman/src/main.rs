//! Manages database-upgrade script catalogs over a commit DAG of named
//! streams.

fn main() {
    kitman_invoke::invoke_main(kitman_query::command_main);
}
