//! Prompt text sent to the word generator.

use crate::types::Tier;

pub const SYSTEM_PROMPT: &str = "Eres un generador de ítems léxicos concisos en español.";

/// Pronunciation rules phrased for the generator.
pub fn tier_guidance(tier: Tier) -> &'static str {
    match tier {
        Tier::One => {
            "muy fáciles de pronunciar: 1–2 sílabas, máximo 6 letras, sin grupos consonánticos \
             (bl, br, cl, cr, dr, fl, fr, gl, gr, pl, pr, tr), sin dígrafos (ll, rr, ch), sin tildes."
        }
        Tier::Two => {
            "dificultad media: 2–3 sílabas, 5–9 letras, permite un grupo consonántico o un dígrafo \
             (ll, rr, ch), pocas tildes."
        }
        Tier::Three => {
            "más complejas: 3 o más sílabas, 8–12 letras, se permiten tildes, dígrafos (ll, rr, ch) \
             y grupos; pueden incluir “x”, “z” o “ñ” cuando sea natural."
        }
    }
}

/// Build the user prompt for one generation call.
pub fn build_prompt(topic: &str, count: usize, tier: Tier, forbidden: &[String]) -> String {
    let mut prompt = format!(
        "Genera {} palabras en español (una por línea) relacionadas con \"{}\".\n\
         Aplica estas reglas estrictamente para el NIVEL {}:\n\
         - {}\n\
         - Solo la palabra final por línea (sin numeración ni guiones).\n\
         - Sin repeticiones ni plurales triviales del mismo término.\n\
         - No incluyas frases ni signos.",
        count,
        topic.trim(),
        tier,
        tier_guidance(tier),
    );
    if !forbidden.is_empty() {
        prompt.push_str(&format!(
            "\nEvita estas palabras (y variantes con mayúsculas/acentos/plurales): {}.",
            forbidden.join(", ")
        ));
    }
    prompt
}
