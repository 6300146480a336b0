//! Constructor argument encoding.

use alloy_core::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use anyhow::{Context, Result};

/// ABI-encode textual constructor arguments against a contract's constructor.
///
/// Values are coerced by parameter type, so `"0x6e8e..."` becomes an
/// `address`, `"20000000000000000000"` a `uint256`, `"CBD"` a `string`.
/// The returned bytes are appended to the creation bytecode on submission
/// and hex-encoded for explorer verification.
pub fn encode_constructor_args(abi: &JsonAbi, args: &[String]) -> Result<Bytes> {
    let Some(constructor) = abi.constructor() else {
        if !args.is_empty() {
            anyhow::bail!(
                "Contract has no constructor but {} argument(s) were provided",
                args.len()
            );
        }
        return Ok(Bytes::new());
    };

    if constructor.inputs.len() != args.len() {
        anyhow::bail!(
            "Constructor expects {} argument(s), got {}",
            constructor.inputs.len(),
            args.len()
        );
    }

    let values = constructor
        .inputs
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (param, arg))| {
            let ty = param
                .resolve()
                .with_context(|| format!("Unsupported constructor parameter type {}", param.ty))?;
            ty.coerce_str(arg).with_context(|| {
                format!(
                    "Invalid value for constructor argument #{} `{}` ({}): {}",
                    i, param.name, param.ty, arg
                )
            })
        })
        .collect::<Result<Vec<DynSolValue>>>()?;

    let encoded = constructor
        .abi_encode_input(&values)
        .context("Failed to ABI-encode constructor arguments")?;

    Ok(encoded.into())
}

/// Creation calldata: bytecode followed by the encoded constructor arguments.
pub fn creation_code(bytecode: &Bytes, encoded_args: &Bytes) -> Bytes {
    let mut code = Vec::with_capacity(bytecode.len() + encoded_args.len());
    code.extend_from_slice(bytecode);
    code.extend_from_slice(encoded_args);
    code.into()
}
