//! Student record types

use serde::{Deserialize, Serialize};

/// Number of stored academic/demographic attributes
pub const PROFILE_LEN: usize = 36;

/// Storage column names, in `StudentProfile::values` order
pub const PROFILE_COLUMNS: [&str; PROFILE_LEN] = [
    "estado_civil",
    "modo_aplicacion",
    "orden_aplicacion",
    "curso",
    "asistencia",
    "calificacion_previa",
    "nota_previa",
    "nacionalidad",
    "estudios_madre",
    "estudios_padre",
    "ocupacion_madre",
    "ocupacion_padre",
    "nota_admision",
    "desplazado",
    "nee",
    "deudor",
    "matricula_al_dia",
    "genero",
    "becado",
    "edad",
    "internacional",
    "cu1_creditos",
    "cu1_inscritas",
    "cu1_evaluaciones",
    "cu1_aprobadas",
    "cu1_nota",
    "cu1_sin_eval",
    "cu2_creditos",
    "cu2_inscritas",
    "cu2_evaluaciones",
    "cu2_aprobadas",
    "cu2_nota",
    "cu2_sin_eval",
    "tasa_desempleo",
    "inflacion",
    "pib",
];

/// Academic and demographic attributes of one student, all stored as floats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentProfile {
    pub estado_civil: f64,
    pub modo_aplicacion: f64,
    pub orden_aplicacion: f64,
    pub curso: f64,
    pub asistencia: f64,
    pub calificacion_previa: f64,
    pub nota_previa: f64,
    pub nacionalidad: f64,
    pub estudios_madre: f64,
    pub estudios_padre: f64,
    pub ocupacion_madre: f64,
    pub ocupacion_padre: f64,
    pub nota_admision: f64,
    pub desplazado: f64,
    /// Educational special needs
    pub nee: f64,
    /// Debtor flag (1 = owes fees)
    pub deudor: f64,
    /// Tuition fees up to date flag
    pub matricula_al_dia: f64,
    /// Gender code (1 = male, 0 = female)
    pub genero: f64,
    /// Scholarship holder flag
    pub becado: f64,
    /// Age at enrollment
    pub edad: f64,
    pub internacional: f64,
    pub cu1_creditos: f64,
    pub cu1_inscritas: f64,
    pub cu1_evaluaciones: f64,
    pub cu1_aprobadas: f64,
    pub cu1_nota: f64,
    pub cu1_sin_eval: f64,
    pub cu2_creditos: f64,
    pub cu2_inscritas: f64,
    pub cu2_evaluaciones: f64,
    pub cu2_aprobadas: f64,
    pub cu2_nota: f64,
    pub cu2_sin_eval: f64,
    pub tasa_desempleo: f64,
    pub inflacion: f64,
    pub pib: f64,
}

impl StudentProfile {
    /// Attribute values in `PROFILE_COLUMNS` order
    pub fn values(&self) -> [f64; PROFILE_LEN] {
        [
            self.estado_civil,
            self.modo_aplicacion,
            self.orden_aplicacion,
            self.curso,
            self.asistencia,
            self.calificacion_previa,
            self.nota_previa,
            self.nacionalidad,
            self.estudios_madre,
            self.estudios_padre,
            self.ocupacion_madre,
            self.ocupacion_padre,
            self.nota_admision,
            self.desplazado,
            self.nee,
            self.deudor,
            self.matricula_al_dia,
            self.genero,
            self.becado,
            self.edad,
            self.internacional,
            self.cu1_creditos,
            self.cu1_inscritas,
            self.cu1_evaluaciones,
            self.cu1_aprobadas,
            self.cu1_nota,
            self.cu1_sin_eval,
            self.cu2_creditos,
            self.cu2_inscritas,
            self.cu2_evaluaciones,
            self.cu2_aprobadas,
            self.cu2_nota,
            self.cu2_sin_eval,
            self.tasa_desempleo,
            self.inflacion,
            self.pib,
        ]
    }

    /// Build a profile from values in `PROFILE_COLUMNS` order
    pub fn from_values(v: [f64; PROFILE_LEN]) -> Self {
        Self {
            estado_civil: v[0],
            modo_aplicacion: v[1],
            orden_aplicacion: v[2],
            curso: v[3],
            asistencia: v[4],
            calificacion_previa: v[5],
            nota_previa: v[6],
            nacionalidad: v[7],
            estudios_madre: v[8],
            estudios_padre: v[9],
            ocupacion_madre: v[10],
            ocupacion_padre: v[11],
            nota_admision: v[12],
            desplazado: v[13],
            nee: v[14],
            deudor: v[15],
            matricula_al_dia: v[16],
            genero: v[17],
            becado: v[18],
            edad: v[19],
            internacional: v[20],
            cu1_creditos: v[21],
            cu1_inscritas: v[22],
            cu1_evaluaciones: v[23],
            cu1_aprobadas: v[24],
            cu1_nota: v[25],
            cu1_sin_eval: v[26],
            cu2_creditos: v[27],
            cu2_inscritas: v[28],
            cu2_evaluaciones: v[29],
            cu2_aprobadas: v[30],
            cu2_nota: v[31],
            cu2_sin_eval: v[32],
            tasa_desempleo: v[33],
            inflacion: v[34],
            pib: v[35],
        }
    }
}

/// Persisted demo student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentRecord {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    /// 1-based row index in the source dataset
    pub source_row: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub created_at_ms: i64,
}

/// Student awaiting insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub full_name: String,
    pub email: String,
    pub source_row: i64,
    pub profile: StudentProfile,
}
