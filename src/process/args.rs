//! Command-line argument assembly for the agent invocation.
//!
//! The argument order is a contract, not an implementation detail: the
//! agent's flag parser may be order-sensitive, so the exact sequence is
//! pinned down by tests.

use crate::client::GenerationRequest;

/// Base flags requesting structured line-delimited JSON output.
/// These always come first, in this order.
pub(crate) const BASE_ARGS: [&str; 3] = ["run", "--output-format", "json"];

/// Build the ordered argument list for one generation request.
///
/// Order: base flags, system prompt pair, user prompt pair, session name
/// pair, standalone resume flag, caller extras verbatim.
///
/// The resume flag is emitted whenever the directive is set, even without a
/// session name; the agent may treat that as invalid, but the behavior is
/// inherited and preserved.
pub(crate) fn build_args(request: &GenerationRequest) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|s| (*s).to_string()).collect();

    if let Some(ref system) = request.system_prompt {
        args.push("--system".to_string());
        args.push(system.clone());
    }

    args.push("-t".to_string());
    args.push(request.prompt.clone());

    if let Some(ref name) = request.session.name {
        args.push("--name".to_string());
        args.push(name.to_string());
    }
    if request.session.resume {
        args.push("--resume".to_string());
    }

    args.extend(request.extra_args.iter().cloned());

    args
}
