use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{self, parse::Parser, punctuated::Punctuated, Ident, Token};

/// This macro is added before a method of `BlackjackCountingEnv` in the impl
/// block. Use this macro to first check if the current episode phase is one of
/// the phases in the attribute.
///
/// For example, `#[allowed_phase(AwaitingAction)]` will make a method first
/// check if the current phase is `EpisodePhase::AwaitingAction`. If not, the
/// method returns `Err(EnvError::PhaseNotAllowed { .. })`.
///
/// The method must return `Result<_, EnvError>`, and both `EpisodePhase` and
/// `EnvError` must be in scope where the method is defined.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let mut ast: syn::ImplItemFn = match syn::parse(item) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };
    let phases = match Punctuated::<Ident, Token![,]>::parse_terminated.parse(attr) {
        Ok(phases) if !phases.is_empty() => phases,
        Ok(_) => {
            return syn::Error::new_spanned(&ast.sig.ident, "allowed_phase needs at least one phase")
                .to_compile_error()
                .into()
        }
        Err(err) => return err.to_compile_error().into(),
    };

    let early_return = generate_phase_check(&ast.sig.ident, &phases);
    let early_return: syn::Stmt = match syn::parse2(early_return) {
        Ok(stmt) => stmt,
        Err(err) => return err.to_compile_error().into(),
    };
    ast.block.stmts.insert(0, early_return);
    ast.into_token_stream().into()
}

fn generate_phase_check(function_name: &Ident, phases: &Punctuated<Ident, Token![,]>) -> TokenStream2 {
    let operation = function_name.to_string();
    let required = phases.first().map(|phase| quote! { EpisodePhase::#phase });
    let allowed = phases.iter().map(|phase| quote! { EpisodePhase::#phase });
    quote! {
        if !matches!(self.current_phase, #(#allowed)|*) {
            return Err(EnvError::PhaseNotAllowed {
                operation: #operation,
                required: #required,
                actual: self.current_phase,
            });
        }
    }
}
