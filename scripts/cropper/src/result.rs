//! 运行结果汇总.

use std::io::{self, Write};

use roi_berry::batch::{BatchReport, BinarizeReport};
use roi_berry::inspect::{ExtentSurvey, ShapeAudit};

const S4: &str = "    ";

/// 第 `axis` 轴的名称.
fn axis_name(rank: usize, axis: usize) -> String {
    match (rank, axis) {
        (3, 0) => "z".to_string(),
        (3, 1) | (2, 0) => "h".to_string(),
        (3, 2) | (2, 1) => "w".to_string(),
        _ => format!("axis {axis}"),
    }
}

/// 将批处理结果写进 `w` 中.
fn describe_batch_into<W: Write>(name: &str, r: &BatchReport, w: &mut W) -> io::Result<()> {
    writeln!(w, "Task `{name}`:")?;
    writeln!(w, "{S4}Cases: {}", r.total())?;
    writeln!(w, "{S4}Succeeded: {}", r.succeeded.len())?;
    write!(w, "{S4}Failed: {}", r.failed.len())?;
    for (case, e) in r.failed.iter() {
        write!(w, "\n{S4}{S4}{case}: {e}")?;
    }
    Ok(())
}

/// 将二值化结果写进 `w` 中.
fn describe_binarize_into<W: Write>(r: &BinarizeReport, w: &mut W) -> io::Result<()> {
    describe_batch_into("binarize", &r.batch, w)?;
    write!(w, "\n{S4}Not binary before clipping: {}", r.non_binary.len())?;
    for case in r.non_binary.iter() {
        write!(w, "\n{S4}{S4}{case}")?;
    }
    Ok(())
}

/// 将 ROI 跨度统计写进 `w` 中.
fn describe_survey_into<W: Write>(s: &ExtentSurvey, w: &mut W) -> io::Result<()> {
    let rank = s.rank();
    writeln!(w, "ROI extents ({} cases):", s.extents.len())?;
    for axis in 0..rank {
        let name = axis_name(rank, axis);
        writeln!(w, "{S4}Spans on {name}: {:?}", s.sorted_spans(axis))?;
        if let Some((case, span)) = s.largest(axis) {
            writeln!(w, "{S4}Largest on {name}: {case} ({span})")?;
        }
    }
    write!(w, "{S4}Unreadable or empty: {}", s.failed.len())?;
    for (case, e) in s.failed.iter() {
        write!(w, "\n{S4}{S4}{case}: {e}")?;
    }
    Ok(())
}

/// 将配准核对结果写进 `w` 中.
fn describe_audit_into<W: Write>(a: &ShapeAudit, w: &mut W) -> io::Result<()> {
    writeln!(w, "Co-registration audit ({} cases):", a.checked)?;
    write!(w, "{S4}Shape mismatches: {}", a.mismatched.len())?;
    for (case, shapes) in a.mismatched.iter() {
        write!(w, "\n{S4}{S4}{case}:")?;
        for (name, shape) in shapes.iter() {
            write!(w, " {name}{shape:?}")?;
        }
    }
    write!(w, "\n{S4}Geometry mismatches: {}", a.geometry_mismatched.len())?;
    for (case, geometries) in a.geometry_mismatched.iter() {
        write!(w, "\n{S4}{S4}{case}:")?;
        for (name, g) in geometries.iter() {
            write!(w, " {name}(spacing {:?}, origin {:?})", g.spacing, g.origin)?;
        }
    }
    write!(w, "\n{S4}Unreadable: {}", a.failed.len())?;
    for (case, name, e) in a.failed.iter() {
        write!(w, "\n{S4}{S4}{case}/{name}: {e}")?;
    }
    Ok(())
}

/// 子命令最终结果.
pub enum Summary {
    /// 裁剪或预览.
    Batch(&'static str, BatchReport),
    /// 二值化.
    Binarize(BinarizeReport),
    /// 数据集检查.
    Inspect(ExtentSurvey, ShapeAudit),
}

impl Summary {
    /// 是否存在失败病例.
    pub fn has_failure(&self) -> bool {
        match self {
            Self::Batch(_, r) => !r.is_success(),
            Self::Binarize(r) => !r.batch.is_success(),
            Self::Inspect(s, a) => !s.failed.is_empty() || !a.is_clean(),
        }
    }

    fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::Batch(name, r) => describe_batch_into(name, r, w),
            Self::Binarize(r) => describe_binarize_into(r, w),
            Self::Inspect(s, a) => {
                describe_survey_into(s, w)?;
                writeln!(w)?;
                utils::sep_to(&mut *w)?;
                describe_audit_into(a, w)
            }
        }
    }

    /// 打印结果.
    pub fn analyze(&self) -> io::Result<()> {
        let mut buf = Vec::with_capacity(512);
        self.describe_into(&mut buf)?;
        let mut out = io::stdout().lock();
        utils::sep_to(&mut out)?;
        out.write_all(&buf)?;
        writeln!(out)?;
        utils::sep_to(&mut out)
    }
}
