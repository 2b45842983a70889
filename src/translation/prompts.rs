/*!
 * Prompt profiles for the translation orchestrator.
 *
 * The tool historically grew several near-identical drivers that differed
 * only in the prompt they sent and how hard they tried to parse the answer.
 * Those variants are collapsed here into `PromptProfile` values: the
 * orchestrator is written once and takes its system prompt, user template,
 * extraction mode, and token policy from the profile.
 */

use std::str::FromStr;

use anyhow::{Result, anyhow};

use crate::extraction::ExtractionMode;

/// Hard ceiling on the per-request output token budget.
pub const MAX_TOKENS_CEILING: u32 = 4096;

/// Everything that varies between orchestrator flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptProfile {
    /// Short identifier used on the CLI
    pub name: &'static str,
    /// System message sent with every request (rules + worked examples)
    pub system_prompt: &'static str,
    /// User message template; `{legacy_code}` is replaced by the snippet
    pub user_template: &'static str,
    /// How the extractor treats a response no strategy can parse
    pub extraction_mode: ExtractionMode,
    /// Whether to size the output budget from the input length
    pub dynamic_tokens: bool,
}

impl PromptProfile {
    /// Profile requesting a JSON-wrapped answer, with the full defensive
    /// extraction cascade behind it. This is the default.
    pub fn json() -> Self {
        JSON_PROFILE
    }

    /// Profile requesting bare code, extracted fence-or-raw. Kept for models
    /// that cannot be trusted to emit JSON at all.
    pub fn plain() -> Self {
        PLAIN_PROFILE
    }

    /// Render the user message for one snippet.
    pub fn user_message(&self, snippet: &str) -> String {
        self.user_template.replace("{legacy_code}", snippet)
    }

    /// Output token budget for one snippet.
    ///
    /// The dynamic policy grants roughly 1.5 output tokens per 4 input
    /// characters plus a fixed floor, capped at the hard ceiling, so long
    /// snippets are not truncated mid-JSON while short ones stay cheap.
    pub fn max_tokens(&self, snippet: &str, configured: u32) -> u32 {
        if self.dynamic_tokens {
            let estimated = ((snippet.len() as f64 / 4.0) * 1.5) as u32 + 500;
            estimated.min(MAX_TOKENS_CEILING)
        } else {
            configured
        }
    }
}

impl FromStr for PromptProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(JSON_PROFILE),
            "plain" => Ok(PLAIN_PROFILE),
            _ => Err(anyhow!("Invalid prompt profile: {}", s)),
        }
    }
}

static JSON_PROFILE: PromptProfile = PromptProfile {
    name: "json",
    system_prompt: JSON_SYSTEM_PROMPT,
    user_template: "Translate this legacy Fortran code to modern Fortran. Respond with JSON only.\n\nLegacy Code:\n{legacy_code}",
    extraction_mode: ExtractionMode::RawFallback,
    dynamic_tokens: true,
};

static PLAIN_PROFILE: PromptProfile = PromptProfile {
    name: "plain",
    system_prompt: PLAIN_SYSTEM_PROMPT,
    user_template: "Translate this legacy Fortran code to modern Fortran:\n{legacy_code}",
    extraction_mode: ExtractionMode::RawFallback,
    dynamic_tokens: false,
};

/// Translation rules and worked examples for the JSON response contract.
/// Opaque configuration as far as the orchestrator is concerned.
const JSON_SYSTEM_PROMPT: &str = r#"
You are given Fortran 77 code that may contain ESOPE extensions.
ESOPE is an extension of Fortran designed for structured memory management, based on the concept of segments (SEGMENT, SEGINI, SEGACT, SEGDES, SEGSUP, SEGADJ, etc.) and pointers (POINTEUR).
The goal is to translate this legacy ESOPE-Fortran code into modern Fortran (Fortran 2008).
You must follow the strict translation rules and patterns demonstrated in the examples below.

Translation Rules
1. Module and Procedure Structure
Module Creation: A standalone SUBROUTINE or FUNCTION (e.g., subroutine newbk) must be converted into a MODULE(e.g., module newbk_mod).
Contains: The original procedure must be placed inside the CONTAINS section of the new module.
Implicit Typing: IMPLICIT NONE must be enforced in all modules and procedures.

2. Declarations and Dependencies
external to use: An external <n> declaration (and its associated type declaration, e.g., integer fndbk) must be replaced with a USE statement (e.g., use :: fndbk_mod).
POINTEUR:
pointeur lib.PSTR -> type(str), pointer :: lib
pointeur <var>.<seg> -> type(<seg>), pointer :: <var>
INTENT: All procedure arguments must be given an INTENT attribute (e.g., intent(in), intent(out), intent(inout)).
For POINTEUR arguments that are initialized or modified, intent(inout) is appropriate.
Includes:
#include "PSTR.inc" -> ! [ooo] empty #include PSTR.inc
#include "tlib.seg" -> Keep the include comments, but add local declarations for the segment's members (e.g., integer :: brcnt, integer :: urcnt).

3. ESOPE Command and Syntax Translation
Pointer Access: Convert ESOPE dot-notation to standard Fortran percent-notation.
lb.bref -> lb % bref
Array Sizing: Convert ESOPE slash-notation to the SIZE intrinsic.
lb.bref(/1) -> size(lb % bref, 1)
mypnt Function: Convert the generic mypnt call to a typed pointer assignment (=>) using the specific function for that type.
lb = mypnt(lib,1) -> lb => tlib_mypnt(lib, 1)
ur = mypnt(lib, lb.uref(iur)) -> ur => user_mypnt(lib, lb % uref(iur))
Memory Allocation (segini): The segini macro must be translated to a subroutine call that explicitly passes the segment's dimensioning variables.
segini, ur -> call segini(ur, ubbcnt)
Memory Resizing (segadj): The segadj macro must also be translated to a call passing the new dimensioning variables.
segadj, ur -> call segadj(ur, ubbcnt)
segadj, lb -> call segadj(lb, brcnt, urcnt)

4. Obsolete and Unused Code
Obsolete Macros: All obsolete memory/state management macros must be commented out and tagged ! [ooo].obsolete:. This includes:
call oooeta(...)
call actstr(...)
segact ...
segdes ...
call desstr(...)
Unused Variables: If an ESOPE bookkeeping variable (like libeta) becomes unused after translation, mark its declaration with ! [ooo].not-used:.

Example 1 ESOPE+Fortran:
c arguments
      pointeur lib.pstr
      character*(*) title
c local variables
      pointeur bk.book

Example 1 Fortran 2008:
! arguments
type(str), pointer, intent(in) :: lib
character(len=*), intent(in) :: title
! local variables
type(book), pointer :: bk

Example 2 ESOPE+Fortran:
subroutine borbk(lib, name, title)
       implicit none
#include "PSTR.inc"
c external functions
       external fndbk
       integer fndbk

Example 2 Fortran 2008:
module borbk_mod
  use :: str_mod
  use :: fndur_mod
  use :: fndbk_mod
  ...
  implicit none
contains
  subroutine borbk(lib, name, title)
    ! [ooo] empty #include PSTR.inc
    ! external functions

Example 3 ESOPE+Fortran:
bk = mypnt(lib, lb.bref(ibk2))
segact, bk

Example 3 Fortran 2008:
bk => book_mypnt(lib, lb % bref(ibk2))
! [ooo].obsolete: segact,bk

Example 4 ESOPE+Fortran:
brcnt = lb.bref(/1)

Example 4 Fortran 2008:
brcnt = size(lb % bref, 1)

Example 5 ESOPE+Fortran:
title2 = bk.btitle
segdes, bk*NOMOD

Example 5 Fortran 2008:
title2 = bk % btitle
! [ooo].obsolete: segdes,bk

Example 6 ESOPE+Fortran:
ubbcnt = ur.ubb(/1)
ubbcnt = ubbcnt + 1
segadj, ur
ur.ubb(ubbcnt) = ibk

Example 6 Fortran 2008:
ubbcnt = size(ur % ubb, 1)
ubbcnt = ubbcnt + 1
call segadj(ur, ubbcnt)
ur % ubb(ubbcnt) = ibk

Example 7 ESOPE+Fortran:
c local variables
      integer libeta
...
      call oooeta(lib, libeta)
      call actstr(lib)
...
c deactivate the structure if activated on entry
      if(libeta.ne.1) call desstr(lib,'MOD')

Example 7 Fortran 2008:
! local variables
    ! [ooo].not-used: integer :: libeta
...
    ! [ooo].obsolete: call oooeta(lib,libeta)
    ! [ooo].obsolete: call actstr(lib)
...
    ! deactivate the structure if activated on entry
    ! [ooo].empty-var: if (libeta /= 1) ! [ooo].obsolete: call desstr(lib,'MOD')

Example 8 ESOPE+Fortran:
if (title2 .eq. title1) then
Example 8 Fortran 2008:
if (title2 == title1) then

IMPORTANT: You must respond ONLY with valid JSON in this exact format:
{
  "translated_code": "the translated Fortran 2008 code here"
}

Do not include any text before or after the JSON. Do not wrap the JSON in markdown code blocks.
"#;

/// Plain-text contract for models that mangle JSON beyond salvage.
const PLAIN_SYSTEM_PROMPT: &str = r#"You are a Fortran code translator. Convert legacy Fortran code to modern Fortran standards.
Return ONLY the translated code without any explanations, comments, or wrapper text.
Use modules, explicit typing with IMPLICIT NONE, modern array syntax, and modern control structures.
Maintain the original functionality while making the code more readable and maintainable.
Do not include any markdown formatting, backticks, or introductory text.
Output only the Fortran code itself."#;
