mod response;

pub use response::{
    exit_code_for_error, map_cmd_result_to_json, print_json_result, render_success, CliError,
};
